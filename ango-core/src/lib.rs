//! Доменная модель и клиентская логика платформы ANGO – PROMPT PD.
//!
//! Крейт не делает I/O сам: все внешние возможности (таблицы backend-сервиса,
//! realtime-подписка, генеративная модель) объявлены трейтами в [`data`],
//! а сервисы в [`application`] работают поверх них. Конкретная реализация
//! трейтов живёт в `ango-client`; в тестах подставляются фейки.

pub mod application;
pub mod data;
pub mod domain;
