pub mod chatbot;
pub mod describe;
pub mod openai;
pub mod testimonials;

pub use chatbot::ChatBot;
pub use openai::{ContentError, OpenAiClient};
pub use testimonials::{Testimonial, TestimonialSource};
