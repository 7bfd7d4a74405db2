// LLM prompt constants for the Generation module.
// Article and blog-title prompts are composed by the client and forwarded as-is.

/// System instruction for prompt optimization. The user's prompt is sent as
/// the user turn, never interpolated here.
pub const OPTIMIZE_SYSTEM: &str = "Rewrite and improve the following user prompt to be clearer, \
    more descriptive, and more effective for AI generation. \
    Preserve intent. \
    Return ONLY the improved prompt.";

/// Resume review prompt template. Replace `{resume_text}` before sending.
pub const RESUME_REVIEW_PROMPT_TEMPLATE: &str = "Review the following resume and provide \
    constructive feedback on its strengths, weaknesses, and areas for improvement. \
    Resume Content:\n\n{resume_text}";
