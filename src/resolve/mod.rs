//! Binding resolution.
//!
//! Maps declaration names to the symbols they denote. Resolution itself is
//! the frontend's job; this layer only fixes the policy that an
//! unresolvable name is dropped from the output and never reported as a
//! failure.

pub mod references;

use crate::ast::TranslationUnit;

/// Resolve `name` to its binding.
///
/// Returns `None` for names the frontend cannot resolve (error recovery,
/// dependent names, unknown macros). Callers exclude such declarations.
pub fn resolve_binding<U>(unit: &U, name: U::Name) -> Option<U::Binding>
where
    U: TranslationUnit + ?Sized,
{
    let binding = unit.resolve_binding(name);
    if binding.is_none() {
        log::trace!("No binding for declaration name {:?}", name);
    }
    binding
}
