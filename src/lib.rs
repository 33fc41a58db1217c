//! # phaser-link
//!
//! A portable, no_std Rust implementation of the control protocol spoken between
//! a shack-side antenna **controller** and a remote **phaser** that switches a
//! phased-array antenna to one of eight compass directions over a LoRa link.
//!
//! The crate contains the protocol engine only:
//! - an 8-point direction model with azimuth, name and relay tables
//! - a keyed 16-bit authentication tag on every command frame
//! - the ASCII command and telemetry codecs
//! - the phaser and controller dispatch state machines
//!
//! The radio itself is a reliable, addressed datagram service supplied by the
//! firmware through the [`transport::Transport`] trait. Relays are
//! `embedded-hal` output pins; sensors are read through [`sensor::Sensors`].
//!
//! ## Crate features
//! | Feature                | Description |
//! |------------------------|-------------|
//! | `std`                  | Disables `#![no_std]` and enables `transport::mock` |
//! | `delay-loop` (default) | Blocking phaser service loop driven by `embedded_hal::delay::DelayNs` |
//! | `defmt-0-3`            | Uses `defmt` logging and derives `defmt::Format` |
//! | `log`                  | Uses `log` logging |
//!
//! ## Usage
//!
//! Phaser firmware:
//!
//! ```rust,ignore
//! use phaser_link::{config::PhaserConfig, phaser::Phaser, transport::run_phaser_loop};
//!
//! let mut phaser = Phaser::new(relay_pins, board_sensors, PhaserConfig::default());
//! run_phaser_loop(&mut phaser, &mut radio, &mut delay);
//! ```
//!
//! Controller firmware:
//!
//! ```rust,ignore
//! use phaser_link::{controller::Controller, direction::Direction};
//!
//! let mut controller = Controller::default();
//! controller.set_direction(&mut radio, &mut delay, Direction::NE)?;
//! show(controller.telemetry);
//! ```
//!
//! ## Integration Notes
//!
//! - Commands are authenticated; replies are not.
//! - Each node only talks to its configured peer address.
//! - All buffers are fixed capacity; nothing allocates.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

pub use heapless;
pub use nb;

#[macro_use]
mod macros;

pub mod auth;
pub mod command;
pub mod config;
pub mod consts;
pub mod controller;
pub mod direction;
pub mod error;
pub mod phaser;
pub mod sensor;
pub mod state;
pub mod telemetry;
pub mod transport;

pub use error::{ErrorKind, Result};
