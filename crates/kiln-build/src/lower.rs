//! Lowering provisioning steps to concrete commands.
//!
//! `Download` and `WriteFile` steps return no commands: the builder
//! materializes them natively (HTTP fetch, direct file write).

use kiln_core::{KilnError, PinnedVersionSet, ProvisionStep};

use crate::error::Result;

fn strings(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

/// Lower one step to the command sequence it executes, in order.
pub fn lower_step(step: &ProvisionStep, pins: &PinnedVersionSet) -> Result<Vec<Vec<String>>> {
    match step {
        ProvisionStep::OsPackages { packages } => {
            let mut install = strings(&["apt-get", "install", "-y", "--no-install-recommends"]);
            install.extend(packages.iter().cloned());
            Ok(vec![strings(&["apt-get", "update"]), install])
        }

        ProvisionStep::JavaRuntime { major_version } => Ok(vec![strings(&[
            "apt-get",
            "install",
            "-y",
            &format!("openjdk-{major_version}-jdk-headless"),
        ])]),

        ProvisionStep::PythonToolchain {
            version,
            upgrade_pip,
        } => {
            let mut commands = vec![strings(&[
                "apt-get",
                "install",
                "-y",
                &format!("python{version}"),
                &format!("python{version}-dev"),
                "python3-pip",
            ])];
            if *upgrade_pip {
                commands.push(strings(&[
                    "python3", "-m", "pip", "install", "--upgrade", "pip",
                ]));
            }
            Ok(commands)
        }

        ProvisionStep::PythonPackages { requirements } => {
            let mut install = strings(&["python3", "-m", "pip", "install"]);
            for req in requirements {
                // A pinned requirement must agree with the pin set; the
                // spec validator enforces this, the lowerer re-checks so
                // a hand-built step cannot sneak a drifted pin through.
                if let Some(pin) = &req.pin {
                    match pins.get(&req.name) {
                        Some(declared) if declared == pin.as_str() => {}
                        _ => {
                            return Err(KilnError::PinViolation {
                                library: req.name.clone(),
                                spec: pin.clone(),
                            }
                            .into())
                        }
                    }
                }
                install.push(req.specifier());
            }
            Ok(vec![install])
        }

        // Materialized natively by the builder.
        ProvisionStep::Download { .. } | ProvisionStep::WriteFile { .. } => Ok(vec![]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::Requirement;

    fn no_pins() -> PinnedVersionSet {
        PinnedVersionSet::new()
    }

    #[test]
    fn os_packages_update_then_install() {
        let step = ProvisionStep::OsPackages {
            packages: vec!["curl".into(), "zlib1g-dev".into()],
        };
        let cmds = lower_step(&step, &no_pins()).unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0], vec!["apt-get", "update"]);
        assert!(cmds[1].contains(&"--no-install-recommends".to_string()));
        assert!(cmds[1].contains(&"zlib1g-dev".to_string()));
    }

    #[test]
    fn java_runtime_selects_major_version() {
        let step = ProvisionStep::JavaRuntime { major_version: 8 };
        let cmds = lower_step(&step, &no_pins()).unwrap();
        assert_eq!(cmds.len(), 1);
        assert!(cmds[0].contains(&"openjdk-8-jdk-headless".to_string()));
    }

    #[test]
    fn python_toolchain_upgrades_pip_when_asked() {
        let step = ProvisionStep::PythonToolchain {
            version: "3.7".into(),
            upgrade_pip: true,
        };
        let cmds = lower_step(&step, &no_pins()).unwrap();
        assert_eq!(cmds.len(), 2);
        assert_eq!(
            cmds[1],
            vec!["python3", "-m", "pip", "install", "--upgrade", "pip"]
        );
    }

    #[test]
    fn python_toolchain_without_pip_upgrade() {
        let step = ProvisionStep::PythonToolchain {
            version: "3.7".into(),
            upgrade_pip: false,
        };
        let cmds = lower_step(&step, &no_pins()).unwrap();
        assert_eq!(cmds.len(), 1);
    }

    #[test]
    fn pinned_requirement_renders_exact_specifier() {
        let mut pins = PinnedVersionSet::new();
        pins.pin("hail", "0.2.122");
        let step = ProvisionStep::PythonPackages {
            requirements: vec![
                Requirement::pinned("hail", "0.2.122"),
                Requirement::floating("scipy"),
            ],
        };
        let cmds = lower_step(&step, &pins).unwrap();
        assert_eq!(cmds.len(), 1);
        assert!(cmds[0].contains(&"hail==0.2.122".to_string()));
        assert!(cmds[0].contains(&"scipy".to_string()));
        assert!(!cmds[0].iter().any(|a| a.starts_with("scipy==")));
    }

    #[test]
    fn drifted_pin_is_rejected() {
        let mut pins = PinnedVersionSet::new();
        pins.pin("hail", "0.2.122");
        let step = ProvisionStep::PythonPackages {
            requirements: vec![Requirement::pinned("hail", "0.2.99")],
        };
        assert!(lower_step(&step, &pins).is_err());
    }

    #[test]
    fn native_steps_lower_to_nothing() {
        let download = ProvisionStep::Download {
            url: "https://example.com/x.jar".into(),
            dest: "jars/x.jar".into(),
            sha256: None,
        };
        let write = ProvisionStep::WriteFile {
            dest: "conf/defaults.conf".into(),
            contents: "a b\n".into(),
        };
        assert!(lower_step(&download, &no_pins()).unwrap().is_empty());
        assert!(lower_step(&write, &no_pins()).unwrap().is_empty());
    }
}
