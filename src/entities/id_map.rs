use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "id_map")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub content_type: String,
    #[sea_orm(indexed)]
    pub tmdb_id: Option<i32>,
    #[sea_orm(indexed)]
    pub tvdb_id: Option<i32>,
    #[sea_orm(indexed)]
    pub imdb_id: Option<String>,
    #[sea_orm(indexed)]
    pub tvmaze_id: Option<i32>,
    pub created_at: String, // RFC 3339; lexicographic order is time order
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
