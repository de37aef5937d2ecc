pub mod truncating_server;
