//! Interactive shell hand-off with the project venv activated.
//!
//! The shell is picked from the explicit override, then `$SHELL` (Windows:
//! `%ComSpec%`), then a platform default. Activation is done by the shell
//! itself so the user ends up at a normal prompt inside the target directory.

use std::path::Path;

use mlstart_core::params::ShellOptions;

use crate::runner::CommandSpec;
use crate::venv::VenvHandle;

const DEFAULT_POSIX_SHELL: &str = "/bin/bash";
const DEFAULT_WINDOWS_SHELL: &str = "cmd.exe";
const POWERSHELL_FALLBACK: &str = "powershell.exe";

/// Platform whose shell conventions apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// Shell families that differ in activation script or flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFamily {
    Bash,
    Zsh,
    Fish,
    Csh,
    Sh,
    Cmd,
    PowerShell,
}

impl ShellFamily {
    /// Classify by program file name (`/usr/bin/zsh`, `pwsh.exe`, `tcsh`).
    pub fn detect(program: &str) -> Self {
        let name = Path::new(program)
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let name = name.strip_suffix(".exe").unwrap_or(&name);
        match name {
            "bash" => ShellFamily::Bash,
            "zsh" => ShellFamily::Zsh,
            "fish" => ShellFamily::Fish,
            "csh" | "tcsh" => ShellFamily::Csh,
            "cmd" => ShellFamily::Cmd,
            "powershell" | "pwsh" => ShellFamily::PowerShell,
            _ => ShellFamily::Sh,
        }
    }

    pub fn activate_script(self) -> &'static str {
        match self {
            ShellFamily::Fish => "activate.fish",
            ShellFamily::Csh => "activate.csh",
            ShellFamily::Cmd => "activate.bat",
            ShellFamily::PowerShell => "Activate.ps1",
            ShellFamily::Bash | ShellFamily::Zsh | ShellFamily::Sh => "activate",
        }
    }

    /// Flags that skip user rc/profile files.
    pub fn clean_flags(self) -> &'static [&'static str] {
        match self {
            ShellFamily::Bash => &["--noprofile", "--norc"],
            ShellFamily::Zsh | ShellFamily::Csh => &["-f"],
            ShellFamily::PowerShell => &["-NoProfile"],
            ShellFamily::Fish | ShellFamily::Sh | ShellFamily::Cmd => &[],
        }
    }
}

/// Ambient shell settings from `SHELL` / `ComSpec`.
#[derive(Debug, Clone, Default)]
pub struct ShellEnv {
    pub shell: Option<String>,
    pub comspec: Option<String>,
}

impl ShellEnv {
    pub fn from_env() -> Self {
        use mlstart_core::config::env_keys::shell;
        use mlstart_core::config::env_optional;
        Self {
            shell: env_optional(shell::SHELL, &[]),
            comspec: env_optional(shell::COMSPEC, &[]),
        }
    }
}

/// Build the interactive shell command: cwd is `target`, the venv is
/// activated before the prompt appears.
pub fn shell_command(
    opts: &ShellOptions,
    venv: &VenvHandle,
    target: &Path,
    ambient: &ShellEnv,
    platform: Platform,
) -> CommandSpec {
    let explicit = opts.shell.clone().filter(|s| !s.trim().is_empty());
    let program = match (explicit, platform) {
        (Some(shell), _) => shell,
        (None, Platform::Unix) => ambient
            .shell
            .clone()
            .unwrap_or_else(|| DEFAULT_POSIX_SHELL.to_string()),
        // Without activate.bat only the PowerShell script can activate.
        (None, Platform::Windows) if !venv.activate_script("activate.bat").exists() => {
            POWERSHELL_FALLBACK.to_string()
        }
        (None, Platform::Windows) => ambient
            .comspec
            .clone()
            .unwrap_or_else(|| DEFAULT_WINDOWS_SHELL.to_string()),
    };
    let family = ShellFamily::detect(&program);
    let activate = venv
        .activate_script(family.activate_script())
        .to_string_lossy()
        .into_owned();
    let clean: &[&str] = if opts.clean { family.clean_flags() } else { &[] };

    let cmd = CommandSpec::new(&program).current_dir(target);
    match family {
        ShellFamily::Cmd => cmd.args(["/k", activate.as_str()]),
        ShellFamily::PowerShell => cmd
            .args(clean.iter().copied())
            .args(["-NoExit", "-Command"])
            .arg(format!(". '{}'", activate.replace('\'', "''"))),
        ShellFamily::Fish => cmd
            .args(clean.iter().copied())
            .args(["-i", "-C"])
            .arg(format!("source {}", fish_quote(&activate))),
        ShellFamily::Csh => cmd.arg("-c").arg(format!(
            "source {} && exec {} {}",
            posix_quote(&activate),
            posix_quote(&program),
            exec_flags(clean)
        )),
        ShellFamily::Bash | ShellFamily::Zsh | ShellFamily::Sh => cmd.arg("-c").arg(format!(
            ". {} && exec {} {}",
            posix_quote(&activate),
            posix_quote(&program),
            exec_flags(clean)
        )),
    }
}

fn exec_flags(clean: &[&str]) -> String {
    let mut flags: Vec<&str> = clean.to_vec();
    flags.push("-i");
    flags.join(" ")
}

fn posix_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn fish_quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', r"\\").replace('\'', r"\'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(shell: Option<&str>, clean: bool) -> ShellOptions {
        ShellOptions {
            enter: true,
            shell: shell.map(str::to_string),
            clean,
        }
    }

    fn venv() -> VenvHandle {
        VenvHandle::at("/work/demo/.venv")
    }

    #[test]
    fn test_detect_family_from_program_path() {
        assert_eq!(ShellFamily::detect("/usr/bin/zsh"), ShellFamily::Zsh);
        assert_eq!(ShellFamily::detect("tcsh"), ShellFamily::Csh);
        assert_eq!(ShellFamily::detect("C:\\Windows\\System32\\cmd.exe"), ShellFamily::Cmd);
        assert_eq!(ShellFamily::detect("pwsh.exe"), ShellFamily::PowerShell);
        assert_eq!(ShellFamily::detect("/bin/dash"), ShellFamily::Sh);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_defaults_to_bash_without_shell_env() {
        let cmd = shell_command(
            &opts(None, false),
            &venv(),
            Path::new("/work/demo"),
            &ShellEnv::default(),
            Platform::Unix,
        );
        assert_eq!(cmd.program, Path::new("/bin/bash"));
        assert_eq!(cmd.cwd.as_deref(), Some(Path::new("/work/demo")));
        assert_eq!(
            cmd.args,
            vec![
                "-c".to_string(),
                ". '/work/demo/.venv/bin/activate' && exec '/bin/bash' -i".to_string()
            ]
        );
    }

    #[cfg(not(windows))]
    #[test]
    fn test_clean_flags_per_family() {
        let ambient = ShellEnv {
            shell: Some("/usr/bin/zsh".into()),
            comspec: None,
        };
        let zsh = shell_command(&opts(None, true), &venv(), Path::new("/w"), &ambient, Platform::Unix);
        assert!(zsh.args[1].ends_with("exec '/usr/bin/zsh' -f -i"));

        let bash = shell_command(&opts(Some("bash"), true), &venv(), Path::new("/w"), &ambient, Platform::Unix);
        assert!(bash.args[1].ends_with("exec 'bash' --noprofile --norc -i"));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_fish_and_csh_use_their_activate_scripts() {
        let fish = shell_command(
            &opts(Some("fish"), true),
            &venv(),
            Path::new("/w"),
            &ShellEnv::default(),
            Platform::Unix,
        );
        assert_eq!(
            fish.args,
            vec!["-i", "-C", "source '/work/demo/.venv/bin/activate.fish'"]
        );

        let csh = shell_command(
            &opts(Some("/bin/tcsh"), false),
            &venv(),
            Path::new("/w"),
            &ShellEnv::default(),
            Platform::Unix,
        );
        assert!(csh.args[1].starts_with("source '/work/demo/.venv/bin/activate.csh' && exec"));
    }

    #[test]
    fn test_windows_prefers_comspec_and_activate_bat() {
        let tmp = tempfile::tempdir().unwrap();
        let venv = VenvHandle::at(tmp.path().join(".venv"));
        std::fs::create_dir_all(venv.bin_dir()).unwrap();
        std::fs::write(venv.activate_script("activate.bat"), "").unwrap();
        let ambient = ShellEnv {
            shell: Some("/usr/bin/zsh".into()),
            comspec: Some("C:\\Windows\\System32\\cmd.exe".into()),
        };
        let cmd = shell_command(&opts(None, false), &venv, tmp.path(), &ambient, Platform::Windows);
        assert_eq!(cmd.program, Path::new("C:\\Windows\\System32\\cmd.exe"));
        assert_eq!(cmd.args[0], "/k");
        assert!(cmd.args[1].ends_with("activate.bat"));
    }

    #[test]
    fn test_windows_falls_back_to_powershell_without_activate_bat() {
        let ambient = ShellEnv {
            shell: None,
            comspec: Some("cmd.exe".into()),
        };
        let cmd = shell_command(&opts(None, false), &venv(), Path::new("/w"), &ambient, Platform::Windows);
        assert_eq!(cmd.program, Path::new("powershell.exe"));
        assert_eq!(cmd.args[0], "-NoExit");
    }

    #[test]
    fn test_powershell_dot_sources_activate_ps1() {
        let cmd = shell_command(
            &opts(Some("pwsh"), true),
            &venv(),
            Path::new("/w"),
            &ShellEnv::default(),
            Platform::Windows,
        );
        assert_eq!(&cmd.args[..3], &["-NoProfile", "-NoExit", "-Command"]);
        assert!(cmd.args[3].starts_with(". '") && cmd.args[3].ends_with("Activate.ps1'"));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_shell_env_ignores_blank_values() {
        std::env::set_var("SHELL", "   ");
        std::env::set_var("ComSpec", " C:\\Windows\\System32\\cmd.exe ");
        let ambient = ShellEnv::from_env();
        std::env::remove_var("ComSpec");
        assert_eq!(ambient.shell, None);
        assert_eq!(
            ambient.comspec.as_deref(),
            Some("C:\\Windows\\System32\\cmd.exe")
        );
    }

    #[test]
    fn test_single_quotes_are_escaped() {
        assert_eq!(posix_quote("/it's/here"), r"'/it'\''s/here'");
        assert_eq!(fish_quote("/it's"), r"'/it\'s'");
    }
}
