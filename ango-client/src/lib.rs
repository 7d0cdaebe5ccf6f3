//! Клиентский шлюз платформы ANGO – PROMPT PD.
//!
//! Крейт реализует возможности, которые `ango-core` описывает трейтами:
//! хранилище профилей, публикаций и личных сообщений поверх REST-интерфейса
//! backend-сервиса ([`BackendClient`]), realtime-подписку на вставки
//! сообщений ([`RealtimeClient`]) и генеративную текстовую модель
//! ([`AiClient`]).
//!
//! # Пример
//!
//! ```no_run
//! use ango_client::{AiClient, BackendClient, Settings};
//! use ango_core::application::assistant::ChatAssistant;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::from_env()?;
//! let backend = BackendClient::new(&settings);
//! backend.sign_in("maria@exemplo.ao", "senha-secreta").await?;
//!
//! let mut assistant = ChatAssistant::new(AiClient::new(&settings));
//! assistant.send("Como escrevo um bom prompt?").await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod ai_client;
mod error;
mod http_client;
mod realtime;
mod settings;

pub use ai_client::AiClient;
pub use error::{ClientError, ClientResult, RLS_POLICY_HINT};
pub use http_client::{BackendClient, Session};
pub use realtime::RealtimeClient;
pub use settings::Settings;
