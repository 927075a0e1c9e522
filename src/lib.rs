// Library root
// -----------
// The binary (`main.rs`) wires these modules together; keeping them in a
// library lets the dispatcher be tested against a fake platform.
//
// Module responsibilities:
// - `config`: deployment profile and the three service URLs.
// - `cli`: clap argument definitions, one struct per subcommand.
// - `api`: the `Platform` trait and its blocking HTTP client.
// - `credentials`: stored sign-in details.
// - `table`: fixed-width column formatting for list output.
// - `ui`: command dispatch and user-facing messages.
pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod table;
pub mod ui;
