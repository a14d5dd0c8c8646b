/// Two-pass assembly, pseudo-instruction expansion and diagnostics.
pub mod assembler;

/// Linked output in tagged and untagged form.
pub mod linker;

/// Include graph walking and `.eqv` substitution.
pub mod preprocess;
