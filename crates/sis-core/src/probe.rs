//! Build dependency checks.
//!
//! Results are cached by dependency name for the lifetime of a
//! [`DepChecker`], so packages sharing a tool are probed once per run.

use std::collections::HashMap;
use std::sync::Arc;

use sis_schema::{DepCheck, ProbeLang, tool_commands};
use thiserror::Error;

use crate::shell::{Shell, quote};
use crate::vars::Variables;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("dependency '{name}' not satisfied: {reason}")]
pub struct DependencyUnsatisfied {
    pub name: String,
    pub reason: String,
}

pub struct DepChecker {
    shell: Arc<dyn Shell>,
    vars: Variables,
    cache: HashMap<String, Result<(), String>>,
}

impl std::fmt::Debug for DepChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepChecker")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl DepChecker {
    pub fn new(shell: Arc<dyn Shell>, vars: Variables) -> Self {
        Self {
            shell,
            vars,
            cache: HashMap::new(),
        }
    }

    /// Run every check in order, stopping at the first failure.
    pub async fn check_all(&mut self, checks: &[DepCheck]) -> Result<(), DependencyUnsatisfied> {
        for check in checks {
            self.check(check).await?;
        }
        Ok(())
    }

    pub async fn check(&mut self, check: &DepCheck) -> Result<(), DependencyUnsatisfied> {
        let name = check.name().to_string();
        let result = if let Some(cached) = self.cache.get(&name).cloned() {
            cached
        } else {
            let result = self.probe(check).await;
            match &result {
                Ok(()) => tracing::debug!(dependency = %name, "satisfied"),
                Err(reason) => tracing::debug!(dependency = %name, %reason, "not satisfied"),
            }
            self.cache.insert(name.clone(), result.clone());
            result
        };
        result.map_err(|reason| DependencyUnsatisfied { name, reason })
    }

    async fn probe(&self, check: &DepCheck) -> Result<(), String> {
        match check {
            DepCheck::Tool { name } => {
                let candidates = tool_commands(name).ok_or_else(|| format!("unknown tool '{name}'"))?;
                self.find_any(candidates.iter().copied()).map(|_| ())
            }
            DepCheck::Command { candidates, .. } => {
                self.find_any(candidates.iter().map(String::as_str)).map(|_| ())
            }
            DepCheck::Library {
                name,
                header,
                lang,
                cflags,
                ldflags,
            } => {
                self.probe_library(name, header.as_deref(), *lang, cflags.as_deref(), ldflags.as_deref())
                    .await
            }
        }
    }

    fn find_any<'a>(&self, candidates: impl Iterator<Item = &'a str> + Clone) -> Result<String, String> {
        candidates
            .clone()
            .find(|c| self.shell.find_program(c).is_some())
            .map(str::to_string)
            .ok_or_else(|| {
                let names: Vec<&str> = candidates.collect();
                format!("none of {} found on the search path", names.join(", "))
            })
    }

    async fn probe_library(
        &self,
        name: &str,
        header: Option<&str>,
        lang: ProbeLang,
        cflags_cmd: Option<&str>,
        ldflags_cmd: Option<&str>,
    ) -> Result<(), String> {
        let compilers = tool_commands(lang.compiler_tool()).unwrap_or_default();
        let compiler = self.find_any(compilers.iter().copied())?;

        let dir = tempfile::Builder::new()
            .prefix("sis-probe-")
            .tempdir()
            .map_err(|e| format!("cannot create probe directory: {e}"))?;

        let cflags = match cflags_cmd {
            Some(cmd) => self.flags_from(cmd, dir.path()).await?,
            None => String::new(),
        };
        let ldflags = match ldflags_cmd {
            Some(cmd) => self.flags_from(cmd, dir.path()).await?,
            None => format!("-l{}", name.strip_prefix("lib").unwrap_or(name)),
        };

        let source_name = format!("probe.{}", lang.extension());
        let mut source = String::new();
        if let Some(header) = header {
            source.push_str(&format!("#include <{header}>\n"));
        }
        source.push_str("int main(void) { return 0; }\n");
        std::fs::write(dir.path().join(&source_name), source)
            .map_err(|e| format!("cannot write probe program: {e}"))?;

        let command = format!("{compiler} {source_name} -o probe {cflags} {ldflags}");
        let output = self
            .shell
            .run(&command, dir.path())
            .await
            .map_err(|e| format!("cannot run {compiler}: {e}"))?;
        if output.success() {
            Ok(())
        } else {
            Err(format!("probe program does not build with `{command}`"))
        }
    }

    async fn flags_from(&self, command: &str, cwd: &std::path::Path) -> Result<String, String> {
        let command = self.vars.expand(command);
        let output = self
            .shell
            .run(&command, cwd)
            .await
            .map_err(|e| format!("cannot run `{command}`: {e}"))?;
        if !output.success() {
            return Err(format!("`{command}` failed"));
        }
        Ok(output.stdout.split_whitespace().map(quote).collect::<Vec<_>>().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::ShellOutput;
    use crate::shell::scripted::ScriptedShell;

    fn checker(shell: ScriptedShell) -> (Arc<ScriptedShell>, DepChecker) {
        let shell = Arc::new(shell);
        let checker = DepChecker::new(shell.clone(), Variables::default());
        (shell, checker)
    }

    #[tokio::test]
    async fn test_tool_found_through_alternate_name() {
        let (_, mut checker) = checker(ScriptedShell::new().with_programs(&["gcc"]));
        assert!(checker.check(&DepCheck::tool("cc")).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_command_names_the_dependency() {
        let (_, mut checker) = checker(ScriptedShell::new().with_programs(&["make"]));
        let check = DepCheck::Command {
            name: "parser".into(),
            candidates: vec!["bison".into(), "yacc".into()],
        };
        let err = checker.check(&check).await.unwrap_err();
        assert_eq!(err.name, "parser");
        assert!(err.reason.contains("bison, yacc"));
    }

    #[tokio::test]
    async fn test_library_probe_uses_flag_commands() {
        let shell = ScriptedShell::new()
            .with_programs(&["cc"])
            .on("xml2-config", |_, _| ShellOutput::ok("-I/usr/include/libxml2\n"))
            .on("cc ", |cmd, cwd| {
                assert!(cwd.join("probe.c").exists());
                if cmd.contains("-I/usr/include/libxml2") && cmd.contains("-lxml2") {
                    ShellOutput::ok("")
                } else {
                    ShellOutput::failed(1, "missing flags")
                }
            });
        let (shell, mut checker) = checker(shell);
        let check = DepCheck::Library {
            name: "libxml2".into(),
            header: Some("libxml/parser.h".into()),
            lang: ProbeLang::C,
            cflags: Some("xml2-config --cflags".into()),
            ldflags: None,
        };
        checker.check(&check).await.unwrap();
        assert_eq!(shell.commands().len(), 2);
    }

    #[tokio::test]
    async fn test_results_are_cached_per_name() {
        let shell = ScriptedShell::new()
            .with_programs(&["cc"])
            .on("cc ", |_, _| ShellOutput::failed(1, "ld: cannot find -lfoo"));
        let (shell, mut checker) = checker(shell);
        let check = DepCheck::Library {
            name: "libfoo".into(),
            header: None,
            lang: ProbeLang::C,
            cflags: None,
            ldflags: None,
        };
        assert!(checker.check(&check).await.is_err());
        assert!(checker.check(&check).await.is_err());
        assert_eq!(shell.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_check_all_stops_at_first_failure() {
        let (_, mut checker) = checker(ScriptedShell::new().with_programs(&["git"]));
        let err = checker
            .check_all(&[DepCheck::tool("git"), DepCheck::tool("cmake"), DepCheck::tool("make")])
            .await
            .unwrap_err();
        assert_eq!(err.name, "cmake");
    }
}
