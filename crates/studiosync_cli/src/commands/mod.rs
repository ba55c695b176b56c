pub(crate) mod meta;
pub(crate) mod migrate;
pub(crate) mod provision;
pub(crate) mod settings;
pub(crate) mod shared;
pub(crate) mod sync;
pub(crate) mod watch;
pub(crate) mod webhook;
