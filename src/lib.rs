//! Spellcast - bimanual gesture recognition for VR spellcasting.
//!
//! Hand poses go in every frame, spell classifications and cast events
//! come out.  See [`casting`] for the engine and [`script`] for the
//! recorded-input format used by the `spellcast` binary.

pub mod casting;
pub mod script;
