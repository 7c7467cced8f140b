//! Pipeline stages for embedding images into a Markdown document.
//!
//! Each submodule implements exactly one transformation step and returns a
//! fully-built value that the next step takes by reference or by value, so
//! every stage can be tested in isolation.
//!
//! ## Data Flow
//!
//! ```text
//! scan ──▶ parse ──▶ resolve ──▶ identify ──▶ assemble
//! (regex)  (alt/loc/title)  (file bytes)  (digest)  (body + hidden block)
//!                                                    ▲
//!                                           pack ────┘
//!                                     (zlib + base64 source)
//! ```
//!
//! 1. [`scan`]     — split the text into literal segments and raw `![..](..)` tokens
//! 2. [`parse`]    — split one token into alt-text, location and optional title
//! 3. [`resolve`]  — turn a location into PNG bytes, or a non-fatal failure
//! 4. [`identify`] — derive the 8-character content identifier from the bytes
//! 5. [`assemble`] — rewrite the body and append the hidden definition block
//! 6. [`pack`]     — compress and encode the original source for the block

pub mod assemble;
pub mod identify;
pub mod pack;
pub mod parse;
pub mod resolve;
pub mod scan;
