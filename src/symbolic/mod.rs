/*!
# Symbolic Core

A small purpose-built algebra covering exactly what cost analysis needs:
finite summation, polynomial expansion with exact rational coefficients,
and dominant-term extraction over one or more size variables.

- [`SymExpr`]: unevaluated expression tree with a textual form
- [`Poly`]: canonical normal form used for simplification and comparison
- [`Growth`]: asymptotic class of a normal form
- [`SymbolCache`]: opaque-symbol interner scoped to one solve
*/

pub mod cache;
pub mod expr;
pub mod growth;
pub mod poly;
pub mod rational;
pub mod simplify;
pub mod summation;
mod text;

pub use cache::{SymbolCache, SymbolId};
pub use expr::SymExpr;
pub use growth::Growth;
pub use poly::{Atom, Monomial, Poly};
pub use rational::Rational;
pub use simplify::{simplify, Simplified, Simplifier, SumResolution};
pub use summation::{sum_poly, SumOutcome};
