use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::models::{CreateEvent, Event};

/// Row of the `events` table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    pub event_type: String,
    pub timestamp: DateTimeWithTimeZone,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Event {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            event_type: model.event_type,
            timestamp: model.timestamp.with_timezone(&Utc),
            metadata: model.metadata,
        }
    }
}

impl From<CreateEvent> for ActiveModel {
    fn from(input: CreateEvent) -> Self {
        ActiveModel {
            id: NotSet,
            user_id: Set(input.user_id),
            event_type: Set(input.event_type),
            timestamp: Set(input.timestamp.unwrap_or_else(Utc::now).into()),
            metadata: Set(input.metadata.map(Json::Object)),
        }
    }
}
