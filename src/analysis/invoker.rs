use log::{debug, info, warn};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::analysis::types::AnalysisRequest;
use crate::configuration::types::OutputFormat;
use crate::error_handling::types::AnalysisError;

/// Runs the decoding engine over capture files.
pub struct AnalysisInvoker {
    engine: PathBuf,
}

impl AnalysisInvoker {
    pub fn new(engine: PathBuf) -> Self {
        Self { engine }
    }

    /// Decodes `request.file` and returns the engine's complete output.
    ///
    /// JSON output is pretty-printed; everything else is returned as the
    /// engine wrote it. No timeout applies, a large file keeps the caller
    /// waiting for as long as the engine runs.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        check_readable(&request.file).await?;

        let args = arguments(request);
        debug!("Running analysis: {} {:?}", self.engine.display(), args);

        let output = Command::new(&self.engine)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(AnalysisError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!(
                "Analysis of {} failed with {:?}: {}",
                request.file.display(),
                output.status.code(),
                stderr.trim()
            );
            return Err(AnalysisError::EngineFailed {
                code: output.status.code(),
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        info!(
            "Analyzed {} as {} ({} bytes of output)",
            request.file.display(),
            request.output_format,
            stdout.len()
        );
        Ok(match request.output_format {
            OutputFormat::Json => pretty_json(stdout),
            _ => stdout,
        })
    }
}

/// Builds the engine command line for one analysis.
pub fn arguments(request: &AnalysisRequest) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-r".into(), request.file.clone().into_os_string()];
    if let Some(filter) = request.display_filter.as_deref() {
        args.push("-Y".into());
        args.push(filter.into());
    }
    if let Some(keylog) = request.keylog_file.as_deref() {
        let mut option = OsString::from("tls.keylog_file:");
        option.push(keylog.as_os_str());
        args.push("-o".into());
        args.push(option);
    }
    match request.output_format {
        OutputFormat::Json => {
            args.push("-T".into());
            args.push("json".into());
        }
        OutputFormat::Fields => {
            args.push("-T".into());
            args.push("fields".into());
            for field in request.field_list() {
                args.push("-e".into());
                args.push(field.into());
            }
        }
        OutputFormat::Text => {}
    }
    args
}

/// Re-renders engine JSON with indentation; unparseable input passes through.
pub fn pretty_json(raw: String) -> String {
    if raw.trim().is_empty() {
        return raw;
    }
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or(raw),
        Err(e) => {
            debug!("Engine JSON did not parse ({}), returning it unchanged", e);
            raw
        }
    }
}

async fn check_readable(path: &Path) -> Result<(), AnalysisError> {
    match tokio::fs::File::open(path).await {
        Ok(file) => match file.metadata().await {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(AnalysisError::Unreadable(
                path.to_path_buf(),
                std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
            )),
            Err(e) => Err(AnalysisError::Unreadable(path.to_path_buf(), e)),
        },
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(AnalysisError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => Err(AnalysisError::Unreadable(path.to_path_buf(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::AnalysisParameters;

    fn request(format: OutputFormat) -> AnalysisRequest {
        AnalysisRequest::new(
            PathBuf::from("/tmp/s.pcapng"),
            &AnalysisParameters {
                output_format: format,
                ..Default::default()
            },
        )
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn text_mode_uses_engine_default_rendering() {
        assert_eq!(strings(arguments(&request(OutputFormat::Text))), vec!["-r", "/tmp/s.pcapng"]);
    }

    #[test]
    fn filter_and_keylog_precede_format() {
        let mut req = request(OutputFormat::Json);
        req.display_filter = Some("tls".into());
        req.keylog_file = Some(PathBuf::from("/keys/sslkeys.log"));
        assert_eq!(
            strings(arguments(&req)),
            vec![
                "-r",
                "/tmp/s.pcapng",
                "-Y",
                "tls",
                "-o",
                "tls.keylog_file:/keys/sslkeys.log",
                "-T",
                "json"
            ]
        );
    }

    #[test]
    fn fields_mode_lists_each_field() {
        let mut req = request(OutputFormat::Fields);
        req.custom_fields = Some("ip.src,ip.dst".into());
        assert_eq!(
            strings(arguments(&req)),
            vec!["-r", "/tmp/s.pcapng", "-T", "fields", "-e", "ip.src", "-e", "ip.dst"]
        );
    }

    #[test]
    fn pretty_json_reindents_and_passes_through_garbage() {
        assert_eq!(
            pretty_json("[{\"a\":1}]".to_string()),
            "[\n  {\n    \"a\": 1\n  }\n]"
        );
        assert_eq!(pretty_json("not json".to_string()), "not json");
        assert_eq!(pretty_json(String::new()), "");
    }

    #[cfg(unix)]
    mod with_engine {
        use super::*;
        use crate::test_support::{fake_engine, write_capture_file};
        use tempfile::TempDir;

        fn capture(dir: &TempDir) -> AnalysisRequest {
            let file = dir.path().join("capture.pcapng");
            write_capture_file(&file);
            AnalysisRequest::new(file, &AnalysisParameters::default())
        }

        #[tokio::test]
        async fn test_text_analysis() {
            let dir = TempDir::new().unwrap();
            let invoker = AnalysisInvoker::new(fake_engine());
            let output = invoker.analyze(&capture(&dir)).await.unwrap();
            assert!(output.contains("10.0.0.1 -> 10.0.0.2"));
        }

        #[tokio::test]
        async fn test_json_analysis_is_pretty_printed() {
            let dir = TempDir::new().unwrap();
            let invoker = AnalysisInvoker::new(fake_engine());
            let mut req = capture(&dir);
            req.output_format = OutputFormat::Json;

            let output = invoker.analyze(&req).await.unwrap();
            assert!(output.contains("\n"));
            let value: serde_json::Value = serde_json::from_str(&output).unwrap();
            assert_eq!(value[0]["_source"]["layers"]["frame.number"][0], "1");
        }

        #[tokio::test]
        async fn test_default_fields_are_requested() {
            let dir = TempDir::new().unwrap();
            let invoker = AnalysisInvoker::new(fake_engine());
            let mut req = capture(&dir);
            req.output_format = OutputFormat::Fields;

            let output = invoker.analyze(&req).await.unwrap();
            assert!(output.starts_with(
                "fields: frame.number frame.time_relative ip.src ip.dst tcp.srcport tcp.dstport"
            ));
        }

        #[tokio::test]
        async fn test_keylog_is_passed_to_engine() {
            let dir = TempDir::new().unwrap();
            let invoker = AnalysisInvoker::new(fake_engine());
            let mut req = capture(&dir);
            req.keylog_file = Some(PathBuf::from("/keys/sslkeys.log"));

            let output = invoker.analyze(&req).await.unwrap();
            assert!(output.contains("option:tls.keylog_file:/keys/sslkeys.log"));
        }

        #[tokio::test]
        async fn test_non_matching_filter_is_empty_success() {
            let dir = TempDir::new().unwrap();
            let invoker = AnalysisInvoker::new(fake_engine());
            let mut req = capture(&dir);
            req.display_filter = Some("frame.number == 0".into());

            assert_eq!(invoker.analyze(&req).await.unwrap(), "");
        }

        #[tokio::test]
        async fn test_engine_failure_carries_stderr() {
            let dir = TempDir::new().unwrap();
            let invoker = AnalysisInvoker::new(fake_engine());
            let mut req = capture(&dir);
            req.display_filter = Some("invalid ((".into());

            match invoker.analyze(&req).await {
                Err(AnalysisError::EngineFailed { code, stderr }) => {
                    assert_eq!(code, Some(4));
                    assert!(stderr.contains("unexpected"));
                }
                other => panic!("expected engine failure, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_missing_file_is_reported() {
            let dir = TempDir::new().unwrap();
            let invoker = AnalysisInvoker::new(fake_engine());
            let req = AnalysisRequest::new(
                dir.path().join("missing.pcapng"),
                &AnalysisParameters::default(),
            );
            assert!(matches!(
                invoker.analyze(&req).await,
                Err(AnalysisError::FileNotFound(_))
            ));

            let dir_req = AnalysisRequest::new(dir.path().to_path_buf(), &AnalysisParameters::default());
            assert!(matches!(
                invoker.analyze(&dir_req).await,
                Err(AnalysisError::Unreadable(_, _))
            ));
        }
    }
}
