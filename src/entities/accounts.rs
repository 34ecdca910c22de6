use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub full_name: String,

    /// Stored lowercase.
    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id PHC string
    pub password_hash: String,

    /// "user" or "admin"
    pub role: String,

    pub is_active: bool,

    pub login_attempts: i32,

    /// RFC 3339 UTC timestamp; a lock is active while this is in the future.
    pub lock_until: Option<String>,

    pub last_login: Option<String>,

    pub phone: Option<String>,

    pub address: Option<String>,

    pub city: Option<String>,

    pub country: Option<String>,

    pub zip_code: Option<String>,

    pub avatar: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cart_items::Entity")]
    CartItems,
}

impl Related<super::cart_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
