//! Flattening of certification trees into per-service records.

use crate::data::{Certification, CoreError, ServiceRecord};

/// Flattens a certification tree into one record per (skill, topic, service)
/// triple, in skill-then-topic-then-service source order. A service listed
/// under two topics yields two records.
///
/// Any blank name anywhere in the tree fails the whole document with
/// `CoreError::Validation`: nothing is emitted, so a half-flattened
/// certification can never reach the store.
pub fn flatten_certification(cert: &Certification) -> Result<Vec<ServiceRecord>, CoreError> {
    if cert.certification_code.trim().is_empty() {
        return Err(CoreError::validation("certificationCode must not be blank"));
    }
    if cert.certification_name.trim().is_empty() {
        return Err(CoreError::validation("certificationName must not be blank"));
    }

    let mut records = Vec::new();
    for skill in &cert.skills_measured {
        if skill.name.trim().is_empty() {
            return Err(CoreError::validation(format!(
                "skill name must not be blank in certification '{}'",
                cert.certification_code
            )));
        }
        for topic in &skill.topics {
            if topic.topic_name.trim().is_empty() {
                return Err(CoreError::validation(format!(
                    "topic name must not be blank under skill '{}'",
                    skill.name
                )));
            }
            for service in &topic.services {
                if service.trim().is_empty() {
                    return Err(CoreError::validation(format!(
                        "service name must not be blank under topic '{}'",
                        topic.topic_name
                    )));
                }
                records.push(ServiceRecord {
                    certification_code: cert.certification_code.clone(),
                    certification_name: cert.certification_name.clone(),
                    skill_name: skill.name.clone(),
                    topic_name: topic.topic_name.clone(),
                    service_name: service.clone(),
                });
            }
        }
    }

    Ok(records)
}

/// Rejects a standalone record carrying any blank field, naming the first
/// offender. Mirrors the tree-level gate for payloads that arrive already
/// flattened.
pub fn validate_service_record(record: &ServiceRecord) -> Result<(), CoreError> {
    let fields = [
        ("certificationCode", &record.certification_code),
        ("certificationName", &record.certification_name),
        ("skillName", &record.skill_name),
        ("topicName", &record.topic_name),
        ("serviceName", &record.service_name),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(CoreError::validation(format!("{} must not be blank", name)));
        }
    }
    Ok(())
}
