// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::process::ExitCode;

use dumped_commit::cmd::cli::run_cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    run_cli().await
}
