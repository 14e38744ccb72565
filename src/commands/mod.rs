/*!
Command handlers for the CLI

- `ask`    — Answer a request interactively or in print mode
- `config` — Show, locate, reset, revert or edit the configuration file
*/

pub mod ask;
pub mod config;
