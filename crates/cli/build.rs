use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("urltitle")
        .version(env!("CARGO_PKG_VERSION"))
        .author("urltitle Contributors")
        .about("Resolve URLs to their page, PDF or notebook titles")
        .arg(clap::arg!(<URL> ... "URLs to resolve; a missing scheme is guessed"))
        .arg(clap::arg!(--json "Print one JSON object per URL"))
        .arg(clap::arg!(--netloc "Print normalized hosts instead of titles, without network access"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("15"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(
            clap::arg!(--"config-dir" <DIR> "Directory of per-host override files (<host>.txt)")
                .value_name("DIR")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"no-builtin" "Ignore the built-in site overrides"))
        .arg(clap::arg!(--attempts <NUM> "Attempts per request, including the first").default_value("3"))
        .arg(clap::arg!(--"webcache-prefix" <PREFIX> "Webcache mirror prefix; empty disables the mirror"))
        .arg(clap::arg!(--insecure "Skip TLS certificate verification"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"))
        .arg(
            clap::arg!(--completions <SHELL> "Generate shell completion script")
                .value_name("SHELL")
                .value_parser(["bash", "zsh", "fish", "powershell", "elvish"]),
        );

    for shell in [
        clap_complete::shells::Shell::Bash,
        clap_complete::shells::Shell::Zsh,
        clap_complete::shells::Shell::Fish,
        clap_complete::shells::Shell::PowerShell,
    ] {
        clap_complete::generate_to(shell, &mut cmd, "urltitle", &completions_dir).unwrap();
    }

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}
