mod channel;
mod helpers;
