use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::FullName).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Accounts::Role)
                            .string()
                            .not_null()
                            .default("user"),
                    )
                    .col(
                        ColumnDef::new(Accounts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Accounts::LoginAttempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Accounts::LockUntil).string().null())
                    .col(ColumnDef::new(Accounts::LastLogin).string().null())
                    .col(ColumnDef::new(Accounts::Phone).string().null())
                    .col(ColumnDef::new(Accounts::Address).string().null())
                    .col(ColumnDef::new(Accounts::City).string().null())
                    .col(ColumnDef::new(Accounts::Country).string().null())
                    .col(ColumnDef::new(Accounts::ZipCode).string().null())
                    .col(
                        ColumnDef::new(Accounts::Avatar)
                            .string()
                            .not_null()
                            .default("default-avatar.png"),
                    )
                    .col(ColumnDef::new(Accounts::CreatedAt).string().not_null())
                    .col(ColumnDef::new(Accounts::UpdatedAt).string().not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    FullName,
    Email,
    Username,
    PasswordHash,
    Role,
    IsActive,
    LoginAttempts,
    LockUntil,
    LastLogin,
    Phone,
    Address,
    City,
    Country,
    ZipCode,
    Avatar,
    CreatedAt,
    UpdatedAt,
}
