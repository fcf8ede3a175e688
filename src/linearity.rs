//! # Compile-Time Linearity
//!
//! This module documents how the type system keeps every chain a single straight line.
//! **Branches, cycles and double wiring are impossible via the public API.**
//!
//! ## Why Chains Stay Linear
//!
//! 1. Every builder method ([`crate::Chain::and_apply`], [`crate::Chain::and_error`],
//!    [`crate::Chain::and_accept`], ...) **consumes** the chain (takes `self` by value)
//! 2. It appends exactly one link after the current tail and returns the chain typed by the
//!    new tail
//! 3. [`crate::Chain`] is not `Clone`, so there is never a second handle to the same tail
//! 4. [`crate::Chain::and_accept`] returns `()`: nothing can follow an accept link
//!
//! A link's successor is therefore written at most once, while the chain is being built, and
//! before the chain is started.
//!
//! ## Proof by Compilation Failure
//!
//! ### Proof 1: Two Successors for One Link
//!
//! ```compile_fail,E0382
//! use chainx::ready;
//!
//! let chain = chainx::from(ready(1));
//!
//! let left = chain.and_apply(|n| ready(n + 1));
//! // ERROR: use of moved value: `chain`
//! let right = chain.and_apply(|n| ready(n * 2));
//! ```
//!
//! ### Proof 2: Nothing After Accept
//!
//! ```compile_fail,E0599
//! use chainx::ready;
//!
//! chainx::from(ready(1))
//!     .and_accept(|n| println!("{n}"))
//!     // ERROR: no method named `and_apply` found for unit type `()`
//!     .and_apply(|n| ready(n));
//! ```
//!
//! ### Proof 3: Links Only Accept Their Predecessor's Output
//!
//! ```compile_fail,E0308
//! use chainx::{ready, Chain};
//!
//! let chain: Chain<i32> = chainx::from(ready("not a number"));
//! ```
//!
//! ## Implications
//!
//! Because the shape is fixed before anything runs:
//! - No runtime check on successor assignment is needed
//! - Links execute strictly in construction order
//! - A chain's links are touched by one resolution at a time, so no locking is needed
