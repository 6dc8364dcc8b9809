//! `cs-demo` — shared pieces of the sample binaries.
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`logging`]  | `tracing-subscriber` setup driven by `RUST_LOG`        |
//! | [`burst`]    | the random-accumulator task used by `wp-burst`         |
//! | [`observer`] | `CsvTickObserver`, `ProgressObserver`                  |
//! | [`classify`] | the map/reduce threshold activity used by `engine-sample` |

pub mod burst;
pub mod classify;
pub mod logging;
pub mod observer;


pub use observer::{CsvTickObserver, ProgressObserver};
