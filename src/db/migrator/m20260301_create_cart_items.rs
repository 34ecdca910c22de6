use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CartItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CartItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CartItems::AccountId).integer().not_null())
                    .col(ColumnDef::new(CartItems::ProductId).string().not_null())
                    .col(ColumnDef::new(CartItems::Category).string().not_null())
                    .col(ColumnDef::new(CartItems::Name).string().not_null())
                    .col(ColumnDef::new(CartItems::Price).double().not_null())
                    .col(
                        ColumnDef::new(CartItems::Quantity)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(CartItems::Image)
                            .string()
                            .not_null()
                            .default("fas fa-box"),
                    )
                    .col(ColumnDef::new(CartItems::CreatedAt).string().not_null())
                    .col(ColumnDef::new(CartItems::UpdatedAt).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_items_account")
                            .from(CartItems::Table, CartItems::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One line per (account, product, category); the upsert in the cart
        // repository relies on this index.
        manager
            .create_index(
                Index::create()
                    .name("idx_cart_items_account_product")
                    .table(CartItems::Table)
                    .col(CartItems::AccountId)
                    .col(CartItems::ProductId)
                    .col(CartItems::Category)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CartItems::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CartItems {
    Table,
    Id,
    AccountId,
    ProductId,
    Category,
    Name,
    Price,
    Quantity,
    Image,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
}
