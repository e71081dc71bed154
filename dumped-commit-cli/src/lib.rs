// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)] // maybe should warn on it, but currently use this pattern and like it
#![warn(clippy::print_stderr)]
#![warn(clippy::print_stdout)]
#![warn(clippy::string_slice)]

pub mod cmd;
pub mod config;
pub mod errors;
mod http;
pub mod matcher;
pub mod paging;
pub mod scm;
pub mod storage;
