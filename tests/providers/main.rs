mod gemini_tests;
mod openai_tests;
