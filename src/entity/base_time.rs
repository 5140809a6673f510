use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, Set};

/// Active models that carry `created_at` / `updated_at` columns.
pub trait ActiveModelTimeBehavior {
    fn created_at_mut(&mut self) -> &mut ActiveValue<DateTime<Utc>>;
    fn updated_at_mut(&mut self) -> &mut ActiveValue<Option<DateTime<Utc>>>;

    /// An explicitly provided `created_at` survives the insert.
    fn stamp(&mut self, insert: bool) {
        let now = Utc::now();
        if insert {
            if self.created_at_mut().is_not_set() {
                *self.created_at_mut() = Set(now);
            }
        } else {
            *self.updated_at_mut() = Set(Some(now));
        }
    }
}

macro_rules! impl_time_behavior {
    () => {
        impl $crate::entity::base_time::ActiveModelTimeBehavior for ActiveModel {
            fn created_at_mut(&mut self) -> &mut sea_orm::ActiveValue<chrono::DateTime<chrono::Utc>> {
                &mut self.created_at
            }

            fn updated_at_mut(
                &mut self,
            ) -> &mut sea_orm::ActiveValue<Option<chrono::DateTime<chrono::Utc>>> {
                &mut self.updated_at
            }
        }

        #[async_trait::async_trait]
        impl ActiveModelBehavior for ActiveModel {
            async fn before_save<C: ConnectionTrait>(
                mut self,
                _db: &C,
                insert: bool,
            ) -> Result<Self, DbErr> {
                $crate::entity::base_time::ActiveModelTimeBehavior::stamp(&mut self, insert);
                Ok(self)
            }
        }
    };
}

pub(crate) use impl_time_behavior;
