//! Prompt Construction
//!
//! Builds the three prompts the pipeline sends: structure planning, page
//! writing, and the chat grounding instruction. Every injected section is
//! clamped independently so an oversized tree or context cannot crowd out
//! the rest of the prompt.

use crate::ai::provider::{ContentRequest, PlanRequest};
use crate::constants::prompt as limits;
use crate::context::clamp_with_marker;

const SECTION_MARKER: &str = "\n...[TRUNCATED]";

/// Structure-planning prompt ("the architect").
pub fn plan_prompt(request: &PlanRequest) -> String {
    let tree = clamp_with_marker(&request.tree_text, limits::MAX_TREE_CHARS, SECTION_MARKER);
    let context = clamp_with_marker(&request.context, limits::MAX_CONTEXT_CHARS, SECTION_MARKER);

    let manifest_block = request
        .manifest
        .as_deref()
        .map(|m| {
            format!(
                "2. Manifest:\n{}\n\n",
                clamp_with_marker(m, limits::MAX_MANIFEST_CHARS, SECTION_MARKER)
            )
        })
        .unwrap_or_default();

    let context_block = if context.is_empty() {
        String::new()
    } else {
        format!("3. Key source code (deep scan):\n{}\n\n", context)
    };

    format!(
        "You are an elite software architect.\n\
         Plan the documentation structure for: {name}.\n\n\
         CONTEXT:\n\
         1. File tree:\n{tree}\n\n\
         {manifest_block}\
         {context_block}\
         INSTRUCTIONS:\n\
         - Analyze the system architecture from the provided files.\n\
         - Produce a table of contents for a complete documentation site.\n\
         - Organize sections into distinct, logical categories; use at least 3\n\
           different categories and aim for 5-8.\n\
         - Never use generic categories such as \"General\", \"Documentation\",\n\
           or \"Misc\". Split any category that grows past 5 items.\n\
         - Do not generate page content yet; plan only, and be granular.\n\
         - Output raw JSON only. No preamble, no explanation.\n\n\
         OUTPUT FORMAT: JSON array of objects:\n\
         [\n\
           {{\n\
             \"id\": \"arch-overview\",\n\
             \"title\": \"System Architecture\",\n\
             \"category\": \"Architecture\",\n\
             \"description\": \"High-level explanation of the system components.\"\n\
           }}\n\
         ]",
        name = request.repo_name,
        tree = tree,
        manifest_block = manifest_block,
        context_block = context_block,
    )
}

/// Page-writing prompt ("the writer").
pub fn content_prompt(request: &ContentRequest) -> String {
    let context = clamp_with_marker(&request.context, limits::MAX_CONTEXT_CHARS, SECTION_MARKER);

    format!(
        "You are a senior technical writer.\n\
         Task: write the \"{title}\" section of the {name} documentation.\n\n\
         Context code:\n{context}\n\n\
         Section goal: {description}\n\n\
         GUIDELINES:\n\
         - Focus on the public interface and usage, not internal implementation\n\
           details; write for the user of this code, not its maintainer.\n\
         - If a documented item is internal, say so briefly and explain its role.\n\
         - Use code blocks for usage examples; document inputs, outputs, and\n\
           types when describing an API.\n\
         - Use standard Markdown. Do not include the page title or a top-level\n\
           H1 (the caller renders it); start directly with H2/H3 sections.\n\
         - Output pure Markdown content, not JSON.",
        title = request.title,
        name = request.repo_name,
        description = request.description,
        context = context,
    )
}

/// Chat grounding instruction ("the librarian").
///
/// The context is already bounded by the assembler's chat ceiling.
pub fn chat_instruction(context: &str) -> String {
    format!(
        "You are the documentation assistant.\n\
         You are an expert on the provided documentation context.\n\n\
         CONTEXT:\n{context}\n\n\
         INSTRUCTIONS:\n\
         - Answer the user's question based only on the provided context.\n\
         - If the answer is not in the context, say \"I don't have enough\n\
           information in the docs to answer that.\"\n\
         - Be concise, helpful, and friendly.\n\
         - Format answers in Markdown.",
        context = context,
    )
}
