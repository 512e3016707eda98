/*!
# Recursion Detection

Finds direct self-calls. A function is recursive when its body contains a
`Call` expression or `CallStatement` naming the function itself; each call
is reported with its line and a compact rendering of its arguments.
*/

pub mod detector;

pub use detector::{RecursionDetector, RecursionReport, RecursiveCall, RecursiveFunction};
