mod llama_api;
mod request_normalizer;
