mod liveness;
mod messages;
mod server;
