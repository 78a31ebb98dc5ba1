/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `serve`  — Run the gateway HTTP server
- `chat`   — Interactive chat mode against a gateway
- `chats`  — Saved-chat management for authenticated users
- `secret` — Assistant API key storage in the platform keyring

These handlers are intentionally small and use the library components:
the gateway, the orchestrator, the session store, and chat storage.
*/

pub mod chat;
pub mod chats;
pub mod secret;
pub mod serve;
