use anyhow::{anyhow, bail, Result};
use x509_parser::certification_request::X509CertificationRequest;
use x509_parser::parse_x509_certificate;
use x509_parser::prelude::FromDer;

use crate::validate::pem_blocks;

/// Accepts X.509 certificates and PKCS#10 certification requests, PEM or raw DER.
///
/// Every certificate-like PEM block must parse; blocks with other labels are ignored.
pub fn check_certificate(content: &[u8]) -> Result<()> {
    let blocks = pem_blocks(content);
    if blocks.is_empty() {
        return parse_certificate_der(content).or_else(|cert_err| {
            parse_certification_request_der(content).map_err(|csr_err| {
                anyhow!("not a certificate ({cert_err}) nor a certificate request ({csr_err})")
            })
        });
    }

    let mut found = false;
    for block in &blocks {
        match block.label.as_str() {
            "CERTIFICATE" | "X509 CERTIFICATE" => parse_certificate_der(&block.contents)?,
            "CERTIFICATE REQUEST" | "NEW CERTIFICATE REQUEST" => {
                parse_certification_request_der(&block.contents)?
            }
            _ => continue,
        }
        found = true;
    }

    if !found {
        bail!("no CERTIFICATE or CERTIFICATE REQUEST block found");
    }
    Ok(())
}

fn parse_certificate_der(der: &[u8]) -> Result<()> {
    let (rest, _certificate) =
        parse_x509_certificate(der).map_err(|err| anyhow!("invalid X.509 certificate: {err}"))?;
    if !rest.is_empty() {
        bail!("trailing data after X.509 certificate");
    }
    Ok(())
}

fn parse_certification_request_der(der: &[u8]) -> Result<()> {
    let (rest, request) = X509CertificationRequest::from_der(der)
        .map_err(|err| anyhow!("invalid certificate request: {err}"))?;
    if !rest.is_empty() {
        bail!("trailing data after certificate request");
    }
    request
        .certification_request_info
        .subject_pki
        .parsed()
        .map_err(|err| anyhow!("certificate request carries no usable public key: {err}"))?;
    Ok(())
}
