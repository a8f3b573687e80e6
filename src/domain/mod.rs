// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that name the concepts of the system:
// a labelled piece of text going in, a predicted class coming
// out, and the traits the outer layers program against.
//
// Rules for this layer:
//   - NO Burn types
//   - NO file I/O
//   - Only structs, enums and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A raw text snippet with its class label
pub mod document;

// The result of classifying one snippet
pub mod prediction;

// Core abstractions implemented by the data and application layers
pub mod traits;
