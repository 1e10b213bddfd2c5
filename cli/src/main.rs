mod api;
mod cli;
mod config;
mod context;
mod notifier;
mod orchestrator;
mod store;
mod test_support;
mod util;

pub fn main() {
    cli::exec();
}
