mod common;
mod migration;
mod routing;
mod store;
