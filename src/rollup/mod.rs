pub mod audit;
pub mod cleanup_queue;
pub mod commit;
pub mod compress;
pub mod config;
pub mod daily;
pub mod manifest;
pub mod monthly;
pub mod naming;
pub mod paths;
pub mod pipeline;
pub mod tier;
pub mod transitions;
pub mod util;
pub mod warn;
pub mod yearly;
