use std::borrow::Cow;

use wgpu::naga::ShaderStage;

pub(crate) fn create_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("wavelines vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

pub(crate) fn create_fragment_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("wavelines fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(FRAGMENT_SHADER_GLSL),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

/// Full-screen triangle; no vertex buffers.
const VERTEX_SHADER_GLSL: &str = r"#version 450
const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    gl_Position = vec4(positions[vertex_index], 0.0, 1.0);
}
";

// Member order and band slots (top 0, middle 1, bottom 2) must match
// `WaveUniforms`.
const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec4 out_color;

layout(set = 0, binding = 0, std140) uniform WaveBlock {
    vec4 u_resolution;
    vec4 u_timing;
    vec4 u_pointer;
    vec4 u_bend;
    vec4 u_parallax;
    ivec4 u_flags;
    ivec4 u_band_enabled;
    ivec4 u_band_line_count;
    vec4 u_band_line_distance;
    vec4 u_band_position[3];
    vec4 u_gradient[8];
};

const int BAND_TOP = 0;
const int BAND_MIDDLE = 1;
const int BAND_BOTTOM = 2;

const vec3 BLACK = vec3(0.0);
const vec3 PINK = vec3(233.0, 71.0, 245.0) / 255.0;
const vec3 BLUE = vec3(47.0, 75.0, 162.0) / 255.0;

vec2 scene_uv(vec2 frag) {
    vec2 uv = (2.0 * frag - u_resolution.xy) / u_resolution.y;
    uv.y = -uv.y;
    return uv;
}

vec2 rotate_uv(vec2 v, float angle) {
    float s = sin(angle);
    float c = cos(angle);
    return vec2(v.x * c + v.y * s, -v.x * s + v.y * c);
}

vec3 background_color(vec2 uv) {
    float y = sin(uv.x - 0.2) * 0.3 - 0.1;
    float m = uv.y - y;
    vec3 col = mix(BLUE, BLACK, smoothstep(0.0, 1.0, abs(m)));
    col += mix(PINK, BLACK, smoothstep(0.0, 1.0, abs(m - 0.8)));
    return col * 0.5;
}

vec3 line_color(float t, vec3 fallback) {
    int count = u_flags.z;
    if (count <= 0) {
        return fallback;
    }
    if (count == 1) {
        return u_gradient[0].rgb * 0.5;
    }
    float scaled = clamp(t, 0.0, 0.9999) * float(count - 1);
    int index = int(floor(scaled));
    int next = min(index + 1, count - 1);
    return mix(u_gradient[index].rgb, u_gradient[next].rgb, fract(scaled)) * 0.5;
}

float bend_offset(vec2 screen_uv, vec2 mouse_uv) {
    vec2 d = screen_uv - mouse_uv;
    float falloff = exp(-dot(d, d) * u_bend.x);
    return (mouse_uv.y - screen_uv.y) * falloff * u_bend.y * u_pointer.z;
}

float wave(vec2 uv, float offset, float time, float bend) {
    float amplitude = sin(offset + time * 0.2) * 0.3;
    float y = sin(uv.x + offset + time * 0.1) * amplitude + bend;
    float m = uv.y - y;
    return 0.0175 / max(abs(m) + 0.01, 1e-3) + 0.01;
}

vec3 band_lines(
    int band,
    float phase_base,
    float phase_step,
    float weight,
    bool mirror,
    vec2 base_uv,
    vec2 mouse_uv,
    vec3 fallback,
    float time
) {
    vec3 col = vec3(0.0);
    if (u_band_enabled[band] == 0) {
        return col;
    }

    int count = u_band_line_count[band];
    float spacing = u_band_line_distance[band];
    vec3 position = u_band_position[band].xyz;

    vec2 ruv = rotate_uv(base_uv, position.z * log(length(base_uv) + 1.0));
    if (mirror) {
        ruv.x = -ruv.x;
    }

    float bend = 0.0;
    if (u_flags.x != 0) {
        bend = bend_offset(base_uv, mouse_uv);
    }

    for (int i = 0; i < count; ++i) {
        float fi = float(i);
        float t = fi / max(float(count - 1), 1.0);
        vec2 sample_uv = ruv + vec2(spacing * fi + position.x, position.y);
        float intensity = wave(sample_uv, phase_base + phase_step * fi, time, bend);
        col += line_color(t, fallback) * intensity * weight;
    }
    return col;
}

void main() {
    // wgpu rasterizes with a top-left origin; the field expects bottom-left.
    vec2 frag = vec2(gl_FragCoord.x, u_resolution.y - gl_FragCoord.y);
    vec2 base_uv = scene_uv(frag);
    if (u_flags.y != 0) {
        base_uv += u_parallax.xy;
    }

    vec2 mouse_uv = vec2(0.0);
    if (u_flags.x != 0) {
        mouse_uv = scene_uv(u_pointer.xy);
    }

    vec3 fallback = u_flags.z > 0 ? BLACK : background_color(base_uv);
    float time = u_timing.x * u_timing.y;

    vec3 col = vec3(0.0);
    col += band_lines(BAND_BOTTOM, 1.5, 0.2, 0.2, false, base_uv, mouse_uv, fallback, time);
    col += band_lines(BAND_MIDDLE, 2.0, 0.15, 1.0, false, base_uv, mouse_uv, fallback, time);
    col += band_lines(BAND_TOP, 1.0, 0.2, 0.1, true, base_uv, mouse_uv, fallback, time);

    out_color = vec4(col, 1.0);
}
";
