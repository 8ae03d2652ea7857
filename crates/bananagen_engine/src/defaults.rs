//! Built-in prompt templates. Rendered with Handlebars; `{{user}}`, `{{char}}`
//! and `{{persona}}` survive rendering and are filled in by the chat context.

pub const DEFAULT_CHAT_DESCRIPTION: &str = r#"=== CHAT FRONT-END ===

The user is running a chat front-end for role-play, creative writing and conversation with AI language models. The story so far comes from that chat.

=== IMAGE PROMPT GENERATOR'S ROLE ===

The **Image Prompt Generator** helps the user create detailed and effective prompts for image generation models. It takes the user's ideas and the story context and turns them into rich descriptions suitable for generating high-quality images.

### How It Works
1. **Provide a Prompt**: the user gives a simple instruction (e.g., "Generate a picture of the characters in the forest").
2. **Receive Suggestions**: the assistant replies with a list of distinct, detailed image prompts, formatted as XML.
3. **Generate Images**: the user renders the prompts they like with an image model.

### Example Image Prompt Suggestion
```xml
<images>
    <image>
        <title>Character in a sun-dappled forest</title>
        <description>A beautiful illustration of {{char}} standing in a sun-dappled clearing in an ancient forest. Sunlight streams through the canopy, illuminating floating dust motes. The character looks towards the viewer with a curious expression. Fantasy concept art, with a focus on light and shadow.</description>
    </image>
</images>
```"#;

pub const DEFAULT_PREVIOUS_PROMPTS: &str = r#"## PREVIOUSLY GENERATED PROMPTS
{{#each entries}}
### (NAME: {{#if label}}{{label}}{{else}}*No name*{{/if}}) (ID: {{id}})
Content: {{#if body}}{{body}}{{else}}*No content*{{/if}}
{{/each}}"#;

/// Previous-prompts template written by older releases. It iterates
/// `possibleSteps` with `comment`/`uid`/`content` fields, which prompt data
/// no longer carries.
pub const LEGACY_PREVIOUS_PROMPTS: &str = r#"## PREVIOUSLY GENERATED PROMPTS
{{#each possibleSteps}}
### (NAME: {{#if comment}}{{comment}}{{else}}*No name*{{/if}}) (ID: {{uid}})
Content: {{#if content}}{{content}}{{else}}*No content*{{/if}}
{{/each}}"#;

pub const DEFAULT_RESPONSE_RULES: &str = r#"{{#if isRevising}}
You must revise the provided image prompt based on the user's instructions. Your response must be a single image prompt, formatted as XML.
{{else}}
You must generate a list of exactly 2 possible image prompts, formatted as XML. Each prompt must have a short title and a detailed paragraph describing a scene.
{{/if}}

Your response must be wrapped in <images> tags. Each suggestion must be wrapped in an <image> tag, containing <title> and <description> tags.

Example:
```xml
<images>
    <image>
        <title>An Unnatural Silence</title>
        <description>A sudden, unnatural silence falls over the forest. The only sound is the rustling of leaves in a wind that carries a chill from a distant, icy peak. The shadows stretch and twist into unsettling shapes.</description>
    </image>
    <image>
        <title>The Hidden Shrine</title>
        <description>An overgrown shrine to a forgotten deity, thick with the scent of ozone and damp earth. On the crumbling stone altar lie fresh offerings: a single white flower and a small carved wooden bird.</description>
    </image>
</images>
```"#;

pub const DEFAULT_TASK_DESCRIPTION: &str = r#"## Your Role as an Image Prompt Generator
- You are a creative assistant that generates detailed image prompts based on user requests and story context.
- Do not speak in the first person.
- Your prompts should be descriptive and evocative, suitable for an AI image generation model.
- Each suggestion must have a short, descriptive title.
- Each suggestion must be a detailed paragraph.
- The prompts should describe a single scene or moment in time.
- Involve characters, the environment, and mood in your descriptions.
{{#if isRevising}}
- You must only generate a single, revised image prompt based on the user's request.
{{else}}
- You must generate exactly 2 distinct options.
{{/if}}

## Your Task
{{#if userInstructions}}
{{userInstructions}}
{{else}}
Generate 2 possible image prompts for the current scene.
{{/if}}"#;

/// Task description shipped before format F_1.2; migrated to the new default.
pub const LEGACY_TASK_DESCRIPTION: &str = "## Rules
- Don't suggest already existing or suggested entries.

## Your Task
{{userInstructions}}";

pub const DEFAULT_IMAGE_PROMPT_TEMPLATE: &str =
    "Generate an image of the following description {{imageDescription}}";
