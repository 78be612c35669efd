//! The single pipeline of an invocation: resolve the configuration, find or
//! create the container, then attach to it or execute the command.
use std::io::Write;

use anyhow::{Context, Result};
use liblxcrun::config::{Config, ConfigBuilder};
use liblxcrun::container::{Container, ContainerResolver, Session, SessionDispatcher};
use liblxcrun::runtime::Runtime;
use liblxcrun_cli::Run;
use serde::Serialize;

#[derive(Serialize)]
struct DebugDump<'a> {
    container: &'a Container,
    config: &'a Config,
}

pub fn run<W: Write>(args: Run, debug: bool, runtime: &dyn Runtime, out: &mut W) -> Result<()> {
    let config = ConfigBuilder::new(Session::new(args.interactive, args.command))
        .with_name(args.name)
        .with_lxc_path(args.lxcpath)
        .with_template(args.template)
        .with_interface(args.interface)
        .with_container_log_dir(args.container_log_dir)
        .with_debug(debug)
        .build(runtime)?;

    let container = ContainerResolver::new(runtime)
        .with_log_dir(&config.container_log_dir)
        .resolve(&config.name, &config.lxc_path, &config.template)?;

    if config.debug {
        dump(&container, &config)?;
    }

    SessionDispatcher::new(runtime).dispatch(&container, &config.session, out)?;
    Ok(())
}

/// Written to stderr so it never mixes with the command output
fn dump(container: &Container, config: &Config) -> Result<()> {
    let dump = serde_json::to_string_pretty(&DebugDump { container, config })
        .context("failed to serialize debug dump")?;
    eprintln!("{dump}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use liblxcrun::config::ConfigError;
    use liblxcrun::container::ResolveError;
    use liblxcrun::runtime::test::{Call, CallKind, TestHelperRuntime, TEST_DEFAULT_LXC_PATH};
    use liblxcrun::runtime::{RuntimeError, RuntimeType};

    use super::*;
    use crate::{report, FATAL_EXIT_CODE};

    fn test_runtime(runtime: &dyn Runtime) -> &TestHelperRuntime {
        runtime
            .as_any()
            .downcast_ref::<TestHelperRuntime>()
            .expect("test runtime")
    }

    fn args(template: &Path, name: Option<&str>, command: &[&str]) -> Run {
        Run {
            name: name.map(str::to_owned),
            interface: "0.0.0.0".to_owned(),
            lxcpath: None,
            template: template.to_path_buf(),
            interactive: false,
            container_log_dir: PathBuf::from("/tmp"),
            command: command.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    fn template() -> Result<(tempfile::TempDir, PathBuf)> {
        let tmp = tempfile::tempdir()?;
        let template = tmp.path().join("lxc-alpine");
        fs::write(&template, "#!/bin/sh\n")?;
        Ok((tmp, template))
    }

    #[test]
    fn test_echo_in_fresh_container() -> Result<()> {
        let (_tmp, template) = template()?;
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());
        helper.set_execute_output("hi\n");
        let mut out = Vec::new();

        run(
            args(&template, Some("web"), &["echo", "hi"]),
            false,
            runtime.as_ref(),
            &mut out,
        )?;

        assert_eq!(out, b"hi\n");
        assert_eq!(
            helper.get_create_args(),
            vec![("web".to_owned(), template.clone())]
        );
        assert!(helper.get_calls().contains(&Call::Execute {
            name: "web".to_owned(),
            args: vec!["echo".to_owned(), "hi".to_owned()],
        }));
        Ok(())
    }

    #[test]
    fn test_second_run_reuses_container() -> Result<()> {
        let (_tmp, template) = template()?;
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());

        for _ in 0..2 {
            run(
                args(&template, Some("web"), &["true"]),
                false,
                runtime.as_ref(),
                &mut Vec::new(),
            )?;
        }

        assert_eq!(helper.count_calls(CallKind::Create), 1);
        assert_eq!(helper.count_calls(CallKind::Execute), 2);
        Ok(())
    }

    #[test]
    fn test_missing_template_fails_before_listing() {
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());

        let result = run(
            args(Path::new("/no/such/template"), Some("web"), &["true"]),
            false,
            runtime.as_ref(),
            &mut Vec::new(),
        );

        let err = result.as_ref().expect_err("template is missing");
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::TemplateMissing { .. })
        ));
        assert_eq!(helper.count_calls(CallKind::DefinedContainers), 0);
        assert_eq!(helper.count_calls(CallKind::Allocate), 0);
        assert_eq!(report(result), FATAL_EXIT_CODE);
    }

    #[test]
    fn test_interactive_ignores_command() -> Result<()> {
        let (_tmp, template) = template()?;
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());
        let mut run_args = args(&template, Some("web"), &["ls"]);
        run_args.interactive = true;

        run(run_args, false, runtime.as_ref(), &mut Vec::new())?;

        assert_eq!(helper.count_calls(CallKind::AttachShell), 1);
        assert_eq!(helper.count_calls(CallKind::Execute), 0);
        Ok(())
    }

    #[test]
    fn test_defaults_are_resolved() -> Result<()> {
        let (_tmp, template) = template()?;
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());

        run(
            args(&template, None, &["true"]),
            true,
            runtime.as_ref(),
            &mut Vec::new(),
        )?;

        let created = helper.get_create_args();
        assert_eq!(created.len(), 1);
        assert!(!created[0].0.is_empty());
        assert!(helper
            .get_template(&created[0].0, Path::new(TEST_DEFAULT_LXC_PATH))
            .is_some());
        Ok(())
    }

    #[test]
    fn test_provisioning_failure_is_fatal() -> Result<()> {
        let (_tmp, template) = template()?;
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());
        helper.set_ret_err(CallKind::Create, || RuntimeError::ToolFailed {
            tool: "lxc-create",
            code: Some(1),
            detail: String::new(),
        });

        let result = run(
            args(&template, Some("web"), &["true"]),
            false,
            runtime.as_ref(),
            &mut Vec::new(),
        );

        let err = result.as_ref().expect_err("create failed");
        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::Provisioning { .. })
        ));
        assert!(format!("{err:#}").contains("\"web\""));
        assert_eq!(helper.count_calls(CallKind::Execute), 0);
        assert_eq!(report(result), FATAL_EXIT_CODE);
        Ok(())
    }

    #[test]
    fn test_execution_failure_writes_nothing() -> Result<()> {
        let (_tmp, template) = template()?;
        let runtime = RuntimeType::Test.create_runtime();
        let helper = test_runtime(runtime.as_ref());
        helper.set_execute_output("never shown");
        helper.set_ret_err(CallKind::Execute, || RuntimeError::ToolFailed {
            tool: "lxc-execute",
            code: Some(127),
            detail: String::new(),
        });
        let mut out = Vec::new();

        let result = run(
            args(&template, Some("web"), &["nope"]),
            false,
            runtime.as_ref(),
            &mut out,
        );

        assert!(result.is_err());
        assert!(out.is_empty());
        Ok(())
    }
}
