pub mod coinbase;
pub mod console;
pub mod discord;
