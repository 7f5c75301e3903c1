pub mod webhook_log;
