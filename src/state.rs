use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::{
    auth::TokenKeys,
    config::Config,
    error::AppError,
    facebook::FacebookClient,
    mail::{LogMailer, Mailer, SmtpMailer},
    store::{MemoryTodoStore, MemoryUserStore, PgTodoStore, PgUserStore, TodoStore, UserStore},
};

/// Which persistence backend the service is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Everything handlers need, shared across workers through `web::Data<AppState>`.
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub todos: Arc<dyn TodoStore>,
    pub mailer: Arc<dyn Mailer>,
    pub facebook: FacebookClient,
    pub tokens: TokenKeys,
    pub storage: StorageBackend,
}

impl AppState {
    /// Assembles a state from explicit parts. Tokens and the Facebook client come from `config`.
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        todos: Arc<dyn TodoStore>,
        mailer: Arc<dyn Mailer>,
        storage: StorageBackend,
    ) -> Self {
        Self {
            tokens: TokenKeys::from_config(&config),
            facebook: FacebookClient::new(&config.facebook_graph_url),
            config,
            users,
            todos,
            mailer,
            storage,
        }
    }

    /// Connects to Postgres and applies migrations when `DATABASE_URL` is set, otherwise
    /// keeps everything in memory. Picks the SMTP mailer when `SMTP_HOST` is set.
    pub async fn from_config(config: Config) -> Result<Self, AppError> {
        let (users, todos, storage) = match &config.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await?;
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| AppError::DatabaseError(format!("Migration failed: {}", e)))?;
                log::info!("Connected to Postgres, migrations applied");
                (
                    Arc::new(PgUserStore::new(pool.clone())) as Arc<dyn UserStore>,
                    Arc::new(PgTodoStore::new(pool)) as Arc<dyn TodoStore>,
                    StorageBackend::Postgres,
                )
            }
            None => {
                log::warn!("DATABASE_URL is not set, data will be kept in memory only");
                (
                    Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>,
                    Arc::new(MemoryTodoStore::new()) as Arc<dyn TodoStore>,
                    StorageBackend::Memory,
                )
            }
        };

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp, &config.mail_from)?),
            None => {
                log::warn!("SMTP_HOST is not set, outgoing mail will only be logged");
                Arc::new(LogMailer)
            }
        };

        Ok(Self::new(config, users, todos, mailer, storage))
    }
}
