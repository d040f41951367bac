pub mod kv_server;
