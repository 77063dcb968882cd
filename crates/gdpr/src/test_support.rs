//! Testing utilities and mocks.
