use crate::config::OpsConfig;
use crate::domain::model::{CommandSpec, Environment};

/// 組合 Compose 命令：`<program> -f base [-f overlay] <args>`
#[derive(Debug, Clone)]
pub struct Compose {
    program: String,
    files: Vec<String>,
}

impl Compose {
    /// Without `-f` flags Compose picks up its default file on its own.
    pub fn plain(config: &OpsConfig) -> Self {
        Self {
            program: config.compose_program().to_string(),
            files: Vec::new(),
        }
    }

    pub fn for_environment(config: &OpsConfig, environment: &Environment) -> Self {
        let mut files = vec![config.compose_base_file().to_string()];
        if environment.is_production() {
            files.push(config.compose_production_overlay().to_string());
        }
        Self {
            program: config.compose_program().to_string(),
            files,
        }
    }

    pub fn uses_overlay(&self) -> bool {
        self.files.len() > 1
    }

    pub fn command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let file_flags = self
            .files
            .iter()
            .flat_map(|f| ["-f".to_string(), f.clone()]);
        CommandSpec::new(self.program.clone())
            .args(file_flags)
            .args(args)
    }

    /// `exec -T <service> <argv...>`，不配置 TTY，適合擷取輸出或導入 stdin
    pub fn exec<I, S>(&self, service: &str, argv: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command(["exec", "-T", service]).args(argv)
    }

    /// `exec <service> <argv...>` with a TTY for shells.
    pub fn exec_interactive<I, S>(&self, service: &str, argv: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command(["exec", service]).args(argv).interactive()
    }
}
