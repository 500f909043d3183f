// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Sidetree Core Contributors

//! Cross-module scenario tests: full resolution histories and end-to-end
//! transaction processing against the in-memory collaborators.
