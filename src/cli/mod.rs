//! # CLI Module
//!
//! Developer commands behind the `contract-router` binary.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Print the flattened route table of a contract document, in tree order:
//!
//! ```bash
//! contract-router routes --contract api.yaml
//! ```
//!
//! ### `validate`
//!
//! Run the validator adapter on a value the way the request pipeline would
//! (coercion and tolerant mode for params, headers and query; strict mode for
//! bodies). Exits with code 1 when the value is rejected.
//!
//! ```bash
//! contract-router validate --contract api.yaml --route pets.create \
//!     --part body --data '{"name": "Rex"}'
//! ```

mod commands;


pub use commands::{routes_table, run_cli, validate_part, Cli, Commands, PartArg};
