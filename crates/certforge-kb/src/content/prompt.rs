//! Prompt composition for the generative synthesis step

/// System message fixing the output contract for every synthesis call.
pub const SYSTEM_MESSAGE: &str = "You are a cloud engineer and mentor specialized in \
    generating beginner-friendly cloud project ideas. Provide the response in JSON \
    format only, without any additional text.";

/// Output-schema description embedded verbatim in every instruction so
/// downstream validation can check conformance against the same shape.
pub const PROJECT_IDEA_JSON_FORMAT: &str = r#"{
    "title": "A concise, descriptive project name",
    "description": "A factual description of the project, highlighting its technical purpose and main features.",
    "steps": [
        "Step 1: Description of the first technical step",
        "Step 2: Description of the second technical step",
        "Step 3: Description of the third technical step",
        "Step 4: Description of the fourth technical step",
        "Step 5: Description of the fifth technical step"
    ]
}"#;

/// Instruction for a recommendation anchored to a certification skill and
/// topic. The service list is a hard constraint: the model may use ONLY
/// the supplied services.
pub fn certification_instruction(skill: &str, topic: &str, services: &[String]) -> String {
    format!(
        "You are a cloud architect specializing in Azure architecture. \
         Please generate a detailed project idea for a small, practical cloud \
         solution based on the following Azure certification skill: {skill} and \
         topic: {topic}. \
         The project should utilize ONLY the following services: {services}. \
         The project should focus on key technical steps without any subjective \
         descriptions or recommendations. \
         The response must be formatted as valid JSON and include only the \
         following fields:\n{format}\n\
         Ensure that the project idea is focused purely on technical details, \
         aligned with best practices in Azure architecture, and small in scope.",
        skill = skill,
        topic = topic,
        services = services.join(", "),
        format = PROJECT_IDEA_JSON_FORMAT,
    )
}

/// Instruction for a recommendation anchored to a cloud engineering concept.
pub fn concept_instruction(concept: &str, services: &[String]) -> String {
    format!(
        "You are a cloud architect. \
         Please generate a detailed project idea for a small, practical cloud \
         solution based on the following cloud engineering concept \
         certification: {concept}. \
         The project should utilize ONLY the following services: {services}. \
         The project should focus on key technical steps without any subjective \
         descriptions or recommendations. \
         The response must be formatted as valid JSON and include only the \
         following fields:\n{format}\n\
         Ensure that the project idea is focused purely on technical details, \
         aligned with best practices in cloud architecture, and small in scope.",
        concept = concept,
        services = services.join(", "),
        format = PROJECT_IDEA_JSON_FORMAT,
    )
}
