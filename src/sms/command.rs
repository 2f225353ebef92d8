use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::SmsConfig;
use crate::error::{Result, VerifierError};
use crate::sms::{PendingDeliveries, SendResult, SmsSender};

/// Sends SMS by running an external program.
///
/// The program is invoked as `<program> <args...> <phone> <body>`. Its exit
/// status is the radio outcome: `0` means sent, `1..=4` map to the platform
/// failure codes, anything else is reported as-is. The outcome is delivered
/// through [`PendingDeliveries`] once the process exits.
#[derive(Debug, Clone)]
pub struct CommandSmsSender {
    config: SmsConfig,
    deliveries: PendingDeliveries,
}

impl CommandSmsSender {
    pub fn new(config: SmsConfig, deliveries: PendingDeliveries) -> Self {
        Self { config, deliveries }
    }

    fn process_output(
        message_id: &str,
        result: std::result::Result<std::process::Output, std::io::Error>,
    ) -> SendResult {
        match result {
            Ok(output) => {
                let send_result = match output.status.code() {
                    Some(0) => SendResult::Ok,
                    Some(code) => SendResult::from_code(code),
                    None => SendResult::GenericFailure,
                };
                if send_result.is_success() {
                    tracing::info!(message_id, "SMS program reported success");
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    tracing::warn!(
                        message_id,
                        result = %send_result,
                        stderr = %stderr.trim(),
                        "SMS program reported failure"
                    );
                }
                send_result
            }
            Err(e) => {
                tracing::error!(message_id, error = %e, "SMS program did not complete");
                SendResult::GenericFailure
            }
        }
    }
}

#[async_trait]
impl SmsSender for CommandSmsSender {
    fn can_send(&self) -> bool {
        self.config.program.is_some()
    }

    async fn send(&self, phone_number: &str, body: &str, message_id: &str) -> Result<()> {
        let program = self
            .config
            .program
            .as_deref()
            .ok_or_else(|| VerifierError::Internal("no SMS program configured".to_string()))?;

        tracing::debug!(message_id, program, "Handing SMS to external program");

        let child = Command::new(program)
            .args(&self.config.args)
            .arg(phone_number)
            .arg(body)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let deliveries = self.deliveries.clone();
        let message_id = message_id.to_string();
        tokio::spawn(async move {
            let result = Self::process_output(&message_id, child.wait_with_output().await);
            deliveries.deliver(&message_id, result).await;
        });

        Ok(())
    }
}
