//! インフラストラクチャ層
//!
//! 外部との通信（Joomla REST APIへのHTTP）を扱う。

pub mod api;
