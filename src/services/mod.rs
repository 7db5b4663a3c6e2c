/*
 * Responsibility
 * - HTTP に依存しないロジック (token 抽出・検証、メッセージ解決)
 */
pub mod auth;
pub mod i18n;
